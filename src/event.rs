use std::fmt::Debug;

use compact_str::CompactString;

use crate::{
    client::StreamSummary,
    domain::{DeletedStatus, DirectMessage, SearchResults, Status, YammerMessages},
    result,
};

/// Which timeline a batch of statuses belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timeline {
    Home,
    Mentions,
    User(CompactString),
}

#[derive(Debug, Clone)]
pub enum TwineEvent {
    AppError(result::TwineError),
    DirectMessagesLoaded(Vec<DirectMessage>),
    SearchLoaded(SearchResults),
    StatusPosted(Box<Status>),
    StatusesLoaded(Timeline, Vec<Status>),
    StreamEnded(StreamSummary),
    StreamStatusDeleted(DeletedStatus),
    StreamStatuses(Vec<Status>),
    YammerMessagesLoaded(YammerMessages),
}

impl TwineEvent {
    /// Get the variant name as a string slice (without "TwineEvent::" prefix)
    pub fn variant_name(&self) -> &'static str {
        match self {
            TwineEvent::AppError(_) => "AppError",
            TwineEvent::DirectMessagesLoaded(_) => "DirectMessagesLoaded",
            TwineEvent::SearchLoaded(_) => "SearchLoaded",
            TwineEvent::StatusPosted(_) => "StatusPosted",
            TwineEvent::StatusesLoaded(_, _) => "StatusesLoaded",
            TwineEvent::StreamEnded(_) => "StreamEnded",
            TwineEvent::StreamStatusDeleted(_) => "StreamStatusDeleted",
            TwineEvent::StreamStatuses(_) => "StreamStatuses",
            TwineEvent::YammerMessagesLoaded(_) => "YammerMessagesLoaded",
        }
    }
}

pub trait IntoTwineEvent {
    fn into_twine_event(self) -> TwineEvent;
}

impl IntoTwineEvent for (Timeline, Vec<Status>) {
    fn into_twine_event(self) -> TwineEvent {
        let (timeline, statuses) = self;
        TwineEvent::StatusesLoaded(timeline, statuses)
    }
}

impl IntoTwineEvent for Vec<DirectMessage> {
    fn into_twine_event(self) -> TwineEvent {
        TwineEvent::DirectMessagesLoaded(self)
    }
}

impl IntoTwineEvent for SearchResults {
    fn into_twine_event(self) -> TwineEvent {
        TwineEvent::SearchLoaded(self)
    }
}

impl IntoTwineEvent for Status {
    fn into_twine_event(self) -> TwineEvent {
        TwineEvent::StatusPosted(Box::new(self))
    }
}

impl IntoTwineEvent for YammerMessages {
    fn into_twine_event(self) -> TwineEvent {
        TwineEvent::YammerMessagesLoaded(self)
    }
}

impl From<StreamSummary> for TwineEvent {
    fn from(summary: StreamSummary) -> Self {
        TwineEvent::StreamEnded(summary)
    }
}
