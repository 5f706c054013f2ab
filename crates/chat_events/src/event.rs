use serde_json::Value;

/// Recognized `type` tags on the live response feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TextStart,
    TextDelta,
    TextEnd,
    ReasoningStart,
    ReasoningDelta,
    ReasoningEnd,
    ToolCallStart,
    ToolCallEnd,
    AgentStart,
    AgentEnd,
}

impl EventKind {
    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "text_start" => Self::TextStart,
            "text_delta" => Self::TextDelta,
            "text_end" => Self::TextEnd,
            "reasoning_start" => Self::ReasoningStart,
            "reasoning_delta" => Self::ReasoningDelta,
            "reasoning_end" => Self::ReasoningEnd,
            "tool_call_start" => Self::ToolCallStart,
            "tool_call_end" => Self::ToolCallEnd,
            "agent_start" => Self::AgentStart,
            "agent_end" => Self::AgentEnd,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextStart => "text_start",
            Self::TextDelta => "text_delta",
            Self::TextEnd => "text_end",
            Self::ReasoningStart => "reasoning_start",
            Self::ReasoningDelta => "reasoning_delta",
            Self::ReasoningEnd => "reasoning_end",
            Self::ToolCallStart => "tool_call_start",
            Self::ToolCallEnd => "tool_call_end",
            Self::AgentStart => "agent_start",
            Self::AgentEnd => "agent_end",
        }
    }
}

/// One decoded unit from the live response feed.
///
/// `kind` is `None` when the payload carried no `type` tag or an
/// unrecognized one; the raw payload is retained so callers can apply
/// fallback field extraction instead of dropping data.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub kind: Option<EventKind>,
    /// Incremental text, present only when the wire field was a string.
    pub delta: Option<String>,
    pub tool_name: Option<String>,
    pub input: Option<Value>,
    pub result: Option<Value>,
    /// Raw decoded payload, `Value::Null` for synthetic events.
    pub payload: Value,
}

impl StreamEvent {
    /// Builds an event from a decoded JSON payload.
    ///
    /// Fields are extracted permissively: a `delta` that is not a string is
    /// treated as absent rather than failing the whole event.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .and_then(EventKind::parse);
        let delta = value
            .get("delta")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let tool_name = value
            .get("toolName")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        let input = value.get("input").cloned();
        let result = value.get("result").cloned();

        Self {
            kind,
            delta,
            tool_name,
            input,
            result,
            payload: value,
        }
    }

    /// Synthetic `text_delta` event used when a payload is not decodable
    /// structured data.
    #[must_use]
    pub fn text_delta(delta: impl Into<String>) -> Self {
        Self {
            kind: Some(EventKind::TextDelta),
            delta: Some(delta.into()),
            tool_name: None,
            input: None,
            result: None,
            payload: Value::Null,
        }
    }

    /// Fallback text extraction for untagged events: `delta`, then `text`,
    /// then `content`, first string wins.
    #[must_use]
    pub fn fallback_text(&self) -> Option<&str> {
        if let Some(delta) = self.delta.as_deref() {
            return Some(delta);
        }
        self.payload
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| self.payload.get("content").and_then(Value::as_str))
    }
}
