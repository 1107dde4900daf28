//! Per-chat conversation state.
//!
//! ```text
//! AwaitingLocation --location--> AwaitingChoice --"1"--> (result sent) AwaitingLocation
//!                                      |
//!                                     "2"
//!                                      v
//!                            AwaitingFollowupCode --code--> (status sent) AwaitingLocation
//! ```
//!
//! A new location resets the flow from any state. Without the interactive
//! flow a location goes straight to a check. Unrelated text never changes
//! state and is never answered.

use lastmile_geo::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;

static FOLLOWUP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{3,16}$").unwrap());

/// Menu choice starting a feasibility check
pub const CHOICE_NEW_CHECK: &str = "1";
/// Menu choice starting an order status lookup
pub const CHOICE_ORDER_STATUS: &str = "2";

/// Where a chat is in the flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Waiting for a location
    #[default]
    AwaitingLocation,
    /// Location received, menu offered
    AwaitingChoice {
        /// Location to check if the caller picks a new check
        point: Coordinate,
    },
    /// Waiting for an order code
    AwaitingFollowupCode,
}

/// Something a chat sent, after parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A location, shared directly or parsed from text
    Location(Coordinate),
    /// Text with no location in it
    Text(String),
}

/// What the bot should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Run the feasibility check and send the result
    Check(Coordinate),
    /// Offer the new-check / order-status menu
    OfferChoice(Coordinate),
    /// Ask for the order code
    AskForCode,
    /// Look up an order and send its status
    LookupOrder(String),
    /// Say nothing
    Ignore,
}

/// Conversation state for one chat.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Current state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Apply an event, returning the action to take.
    pub fn advance(&mut self, event: SessionEvent, interactive: bool) -> Action {
        let (next, action) = transition(&self.state, event, interactive);
        self.state = next;
        action
    }
}

/// Pure transition function.
pub fn transition(state: &SessionState, event: SessionEvent, interactive: bool) -> (SessionState, Action) {
    match (state, event) {
        (_, SessionEvent::Location(point)) if interactive => {
            (SessionState::AwaitingChoice { point }, Action::OfferChoice(point))
        }
        (_, SessionEvent::Location(point)) => (SessionState::AwaitingLocation, Action::Check(point)),

        (SessionState::AwaitingChoice { point }, SessionEvent::Text(text)) => match text.trim() {
            CHOICE_NEW_CHECK => (SessionState::AwaitingLocation, Action::Check(*point)),
            CHOICE_ORDER_STATUS => (SessionState::AwaitingFollowupCode, Action::AskForCode),
            _ => (state.clone(), Action::Ignore),
        },

        (SessionState::AwaitingFollowupCode, SessionEvent::Text(text)) => {
            let code = text.trim();
            if FOLLOWUP_CODE.is_match(code) {
                (SessionState::AwaitingLocation, Action::LookupOrder(code.to_string()))
            } else {
                (SessionState::AwaitingFollowupCode, Action::Ignore)
            }
        }

        (SessionState::AwaitingLocation, SessionEvent::Text(_)) => (SessionState::AwaitingLocation, Action::Ignore),
    }
}
