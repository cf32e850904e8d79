use std::sync::mpsc;

use tracing::trace;

use crate::event::TwineEvent;

pub trait Dispatcher {
    fn dispatch(&self, event: TwineEvent);
}

impl Dispatcher for mpsc::Sender<TwineEvent> {
    fn dispatch(&self, event: TwineEvent) {
        let name = event.variant_name();
        if self.send(event).is_err() {
            trace!(event = name, "Event receiver dropped");
        }
    }
}
