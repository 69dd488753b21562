use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct LogState {
    text: String,
    lines: usize,
}

/// Append-only log of received payloads, one line per message
///
/// Written only by the consumer worker. A line is pushed under a single
/// write guard, so a snapshot never observes a partial line.
#[derive(Debug, Default)]
pub struct ResultLog {
    state: RwLock<LogState>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn append(&self, line: &str) {
        let mut state = self.state.write().await;
        state.text.push_str(line);
        state.text.push('\n');
        state.lines += 1;
    }

    /// Full accumulated text at call time
    pub async fn snapshot(&self) -> String {
        self.state.read().await.text.clone()
    }

    pub async fn line_count(&self) -> usize {
        self.state.read().await.lines
    }
}
