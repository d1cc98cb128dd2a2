//! Frame dispatch by message type
//!
//! The decoder only guarantees a frame is well formed. A [`Dispatcher`]
//! routes each frame to the handler registered for its `msg_type` and
//! keeps count of types nobody claimed.

use std::collections::BTreeMap;
use std::fmt;

use tessera_protocol::{Frame, FrameHandler};

use crate::logger::Logger;

/// Boxed per-type handler
pub type Handler = Box<dyn FnMut(&Frame) + Send>;

/// Result of routing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler for the frame's type ran
    Handled,
    /// No handler for this type; the fallback ran if one is set
    Unrecognized,
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    /// Frames routed to a type handler
    pub handled: usize,
    /// Frames whose type had no handler
    pub unrecognized: usize,
}

/// Routes frames to handlers keyed by `msg_type`
pub struct Dispatcher {
    handlers: BTreeMap<u8, Handler>,
    fallback: Option<Handler>,
    logger: Logger,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(logger: Logger) -> Self {
        Self {
            handlers: BTreeMap::new(),
            fallback: None,
            logger,
            stats: DispatchStats::default(),
        }
    }

    /// Register the handler for `msg_type`, returning any it replaces
    pub fn on<F>(&mut self, msg_type: u8, handler: F) -> Option<Handler>
    where
        F: FnMut(&Frame) + Send + 'static,
    {
        self.handlers.insert(msg_type, Box::new(handler))
    }

    /// Handler for frames no type handler claims
    pub fn on_unrecognized<F>(&mut self, handler: F)
    where
        F: FnMut(&Frame) + Send + 'static,
    {
        self.fallback = Some(Box::new(handler));
    }

    /// Drop the handler for `msg_type`
    pub fn remove(&mut self, msg_type: u8) -> Option<Handler> {
        self.handlers.remove(&msg_type)
    }

    /// Whether `msg_type` has a handler
    pub fn handles(&self, msg_type: u8) -> bool {
        self.handlers.contains_key(&msg_type)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Route one frame
    pub fn dispatch(&mut self, frame: &Frame) -> Dispatch {
        match self.handlers.get_mut(&frame.msg_type) {
            Some(handler) => {
                self.logger.debug(format_args!(
                    "msg_type {:#04x} id {} ({} bytes)",
                    frame.msg_type,
                    frame.header.msg_id,
                    frame.payload.len()
                ));
                handler(frame);
                self.stats.handled += 1;
                Dispatch::Handled
            }
            None => {
                self.logger.warn(format_args!(
                    "unrecognized msg_type {:#04x} id {}",
                    frame.msg_type, frame.header.msg_id
                ));
                if let Some(fallback) = self.fallback.as_mut() {
                    fallback(frame);
                }
                self.stats.unrecognized += 1;
                Dispatch::Unrecognized
            }
        }
    }
}

impl FrameHandler for Dispatcher {
    fn handle(&mut self, frame: &Frame) {
        self.dispatch(frame);
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("types", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
