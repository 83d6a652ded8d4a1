//! Trace prefix windows
//!
//! A window exposes `trace[0..=i]` and nothing after it. Feature families
//! only ever see a window, so no feature can read a later event. The full
//! trace length is the single piece of whole-trace information carried.

use std::collections::HashSet;

use crate::log::{Event, Trace};

/// Neutral value for absent categorical attributes
pub const UNKNOWN: &str = "UNKNOWN";

/// Padding token for activity history shorter than the window
pub const START: &str = "START";

/// The events of a trace up to and including the current one
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    events: &'a [Event],
    trace_len: usize,
}

impl<'a> Window<'a> {
    /// Window ending at `index`, or `None` if the trace is shorter
    pub fn new(trace: &'a Trace, index: usize) -> Option<Self> {
        let events = trace.events().get(..=index)?;
        Some(Self {
            events,
            trace_len: trace.len(),
        })
    }

    /// Position of the current event in its trace
    pub fn index(&self) -> usize {
        self.events.len() - 1
    }

    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    pub fn current(&self) -> &'a Event {
        &self.events[self.events.len() - 1]
    }

    pub fn first(&self) -> &'a Event {
        &self.events[0]
    }

    /// Event immediately before the current one
    pub fn previous(&self) -> Option<&'a Event> {
        self.index().checked_sub(1).map(|i| &self.events[i])
    }

    /// Window ending at the previous event
    pub fn shrink(&self) -> Option<Window<'a>> {
        if self.events.len() < 2 {
            return None;
        }
        Some(Window {
            events: &self.events[..self.events.len() - 1],
            trace_len: self.trace_len,
        })
    }

    pub fn trace_len(&self) -> usize {
        self.trace_len
    }

    pub fn unique_activities(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.activity())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Categorical reading of a column on one event, `UNKNOWN` when absent
pub fn category(event: &Event, column: &str) -> String {
    event
        .attribute(column)
        .as_category()
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Number of positions j in 1..len where `key(j) != key(j-1)`
pub fn transitions<T, F>(events: &[Event], key: F) -> usize
where
    T: PartialEq,
    F: Fn(&Event) -> T,
{
    let keys: Vec<T> = events.iter().map(key).collect();
    keys.windows(2).filter(|w| w[0] != w[1]).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::AttrValue;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn trace(groups: &[&str]) -> Trace {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let events = groups
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let mut attrs = BTreeMap::new();
                attrs.insert("org:group".to_string(), AttrValue::Text(g.to_string()));
                Event::new(
                    "c",
                    format!("A{}", i % 2),
                    base + chrono::Duration::minutes(i as i64),
                    attrs,
                    i,
                )
            })
            .collect();
        Trace::new("c", events).unwrap()
    }

    #[test]
    fn test_window_bounds() {
        let t = trace(&["A", "B", "C"]);
        let w = Window::new(&t, 1).unwrap();
        assert_eq!(w.index(), 1);
        assert_eq!(w.events().len(), 2);
        assert_eq!(w.trace_len(), 3);
        assert_eq!(w.previous().unwrap().position(), 0);
        assert!(Window::new(&t, 3).is_none());
    }

    #[test]
    fn test_shrink() {
        let t = trace(&["A", "B"]);
        let w = Window::new(&t, 1).unwrap();
        assert_eq!(w.shrink().unwrap().index(), 0);
        assert!(w.shrink().unwrap().shrink().is_none());
    }

    #[test]
    fn test_transitions() {
        let t = trace(&["A", "A", "B", "A"]);
        assert_eq!(transitions(t.events(), |e| category(e, "org:group")), 2);
        assert_eq!(transitions(&t.events()[..1], |e| category(e, "org:group")), 0);
    }

    #[test]
    fn test_unique_activities() {
        let t = trace(&["A", "A", "A"]);
        assert_eq!(Window::new(&t, 2).unwrap().unique_activities(), 2);
    }

    #[test]
    fn test_category_neutral() {
        let t = trace(&["A"]);
        assert_eq!(category(&t.events()[0], "missing"), UNKNOWN);
    }
}
