//! # Session Segmenter
//!
//! Partitions viewing records into sessions by inter-event gap. Records
//! are ordered by timestamp (stable, so ties keep input order) and a new
//! session starts at a record whose gap to its predecessor is strictly
//! greater than the threshold.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::record::ViewingRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub session_id: u32,
    pub view_count: usize,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_hours: f64,
}

impl Session {
    fn open(session_id: u32, at: NaiveDateTime) -> Self {
        Self {
            session_id,
            view_count: 1,
            start_time: at,
            end_time: at,
            duration_hours: 0.0,
        }
    }

    fn extend(&mut self, at: NaiveDateTime) {
        self.view_count += 1;
        self.end_time = at;
        self.duration_hours = hours(self.end_time - self.start_time);
    }

    pub fn is_binge(&self) -> bool {
        self.view_count > 1
    }
}

/// Full segmentation result, singletons included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTable {
    pub sessions: Vec<Session>,
    /// Session id of each record, indexed by input position.
    pub membership: Vec<u32>,
}

impl SessionTable {
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions with more than one view.
    pub fn binge_sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter().filter(|s| s.is_binge())
    }

    pub fn session_of(&self, record_index: usize) -> Option<&Session> {
        let id = *self.membership.get(record_index)?;
        self.sessions.get(id as usize)
    }
}

/// Segment `records` into sessions separated by gaps longer than `threshold`.
pub fn segment(records: &[ViewingRecord], threshold: Duration) -> SessionTable {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&idx| records[idx].timestamp);

    let mut sessions: Vec<Session> = Vec::new();
    let mut membership = vec![0u32; records.len()];
    let mut previous: Option<NaiveDateTime> = None;

    for idx in order {
        let at = records[idx].timestamp;
        match (previous, sessions.last_mut()) {
            (Some(prev), Some(current)) if at - prev <= threshold => current.extend(at),
            _ => {
                let id = sessions.len() as u32;
                sessions.push(Session::open(id, at));
            }
        }
        membership[idx] = sessions.len() as u32 - 1;
        previous = Some(at);
    }

    SessionTable {
        sessions,
        membership,
    }
}

fn hours(delta: Duration) -> f64 {
    delta.num_milliseconds().max(0) as f64 / 3_600_000.0
}
