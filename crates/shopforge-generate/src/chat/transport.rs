use crate::errors::GenerateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Line-oriented server-sent-events decoder. Lines and frames may span chunks;
/// a blank line dispatches the fields gathered since the previous one.
#[derive(Default)]
pub(crate) struct SseDecoder {
    partial: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        for piece in chunk.split_inclusive(|b| *b == b'\n') {
            self.partial.extend_from_slice(piece);
            if self.partial.last() != Some(&b'\n') {
                break;
            }
            let line = std::mem::take(&mut self.partial);
            frames.extend(self.accept_line(&line));
        }
        frames
    }

    /// Flushes a trailing frame the server did not terminate with a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let line = std::mem::take(&mut self.partial);
        self.accept_line(&line).or_else(|| self.dispatch())
    }

    fn accept_line(&mut self, raw: &[u8]) -> Option<SseFrame> {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return self.dispatch();
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // Empty field name is a comment; unknown fields are ignored.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChunkEvent {
    Delta(String),
    Finished { reason: String },
}

pub(crate) fn map_frame_to_events(frame: &SseFrame) -> Result<Vec<ChunkEvent>, GenerateError> {
    let data = frame.data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(data)
        .map_err(|e| GenerateError::protocol(format!("invalid SSE JSON frame: {e}")))?;
    map_chunk_json_to_events(&value)
}

pub(crate) fn map_chunk_json_to_events(
    value: &serde_json::Value,
) -> Result<Vec<ChunkEvent>, GenerateError> {
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("completion stream error");
        return Err(GenerateError::provider(message, None));
    }
    let Some(choice) = value
        .get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
    else {
        return Ok(Vec::new());
    };

    let mut events = Vec::new();
    let content = choice
        .get("delta")
        .or_else(|| choice.get("message"))
        .and_then(|d| d.get("content"))
        .and_then(|v| v.as_str());
    if let Some(text) = content.filter(|t| !t.is_empty()) {
        events.push(ChunkEvent::Delta(text.to_string()));
    }
    if let Some(reason) = choice.get("finish_reason").and_then(|v| v.as_str()) {
        events.push(ChunkEvent::Finished {
            reason: reason.to_string(),
        });
    }
    Ok(events)
}
