// ============================================================================
// Message Processor
// ============================================================================
//
// Handles one message handed over by the receive loop:
// 1. Narrow to a TextMessage; anything else is logged and skipped
// 2. Append the payload as a line to the result log
// 3. Report whether the payload was the sentinel
//
// The sentinel is appended like any other payload before the loop exits.
//
// ============================================================================

use tracing::{debug, info, warn};

use crate::message::Message;
use crate::metrics;
use crate::result_log::ResultLog;

/// Outcome of processing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// Payload appended, keep receiving
    Appended,
    /// Sentinel appended, stop receiving
    Sentinel,
    /// Not a text message, nothing appended
    Skipped,
}

pub async fn process_message(log: &ResultLog, sentinel: &str, message: Message) -> ProcessResult {
    let kind = message.kind();
    let text = match message.into_text() {
        Ok(text) => text,
        Err(e) => {
            metrics::MESSAGES_MALFORMED_TOTAL.inc();
            warn!(error = %e, kind = kind, "Skipping non-text message");
            return ProcessResult::Skipped;
        }
    };

    info!(bytes = text.text().len(), "Received Message");
    debug!(payload = %text.text(), "Received payload");
    log.append(text.text()).await;
    metrics::MESSAGES_RECEIVED_TOTAL.inc();

    if text.text() == sentinel {
        debug!("Sentinel payload observed");
        ProcessResult::Sentinel
    } else {
        ProcessResult::Appended
    }
}
