//! Incremental server-sent events parser
//!
//! Bytes are fed in as they arrive; complete events come out. Lines may end
//! in `\r\n`, `\n` or `\r`, and a chunk boundary may fall anywhere, including
//! inside a UTF-8 sequence or between `\r` and `\n`.

use std::time::Duration;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Event type used when the stream does not name one
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A dispatched event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    pub event_type: String,
    pub data: String,
    pub last_event_id: Option<String>,
}

/// Stream parser state for one connection
#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes of the line being assembled
    line: Vec<u8>,

    /// Last byte seen was `\r`
    pending_cr: bool,

    /// First line has been processed (BOM check done)
    started: bool,

    data: String,
    event_type: String,

    /// `id:` value read so far; committed when the event dispatches
    id_buffer: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser for a reconnection, carrying the id the server last delivered
    pub fn resume(last_event_id: Option<String>) -> Self {
        Self {
            id_buffer: last_event_id.clone(),
            last_event_id,
            ..Self::default()
        }
    }

    /// Feed a chunk of the response body, returning any completed events
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\r' => {
                    self.pending_cr = true;
                    self.end_line(&mut events);
                }
                b'\n' => self.end_line(&mut events),
                _ => self.line.push(byte),
            }
        }

        events
    }

    /// `id:` of the most recently dispatched event block
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Take the reconnection delay requested by the server, if any
    pub fn take_retry(&mut self) -> Option<Duration> {
        self.retry.take()
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let mut bytes = std::mem::take(&mut self.line);
        if !self.started {
            self.started = true;
            if bytes.starts_with(BOM) {
                bytes.drain(..BOM.len());
            }
        }

        let line = String::from_utf8_lossy(&bytes);
        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }

        if line.starts_with(':') {
            // Comment / keep-alive
            return;
        }

        let (field, value) = match line.find(':') {
            Some(pos) => {
                let value = &line[pos + 1..];
                (&line[..pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (&line[..], ""),
        };

        match field {
            "event" => self.event_type = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.id_buffer = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        // The id counts as delivered even when the block carries no data
        self.last_event_id.clone_from(&self.id_buffer);

        let event_type = std::mem::take(&mut self.event_type);
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            event_type: if event_type.is_empty() {
                DEFAULT_EVENT_TYPE.to_string()
            } else {
                event_type
            },
            data,
            last_event_id: self.last_event_id.clone(),
        })
    }
}
