use std::{any::Any, fmt, str::FromStr, sync::Arc};

use thiserror::Error;

use crate::{failure::Failure, value::Value};

pub(crate) const SUCCESS: &str = "Success";

/// The message half of an envelope.
#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Failure(Arc<Failure>),
}

impl Message {
    /// The captured failure, if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Text(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Failure(failure) => write!(f, "{failure}"),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Failure(a), Self::Failure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Outcome of one supervised execution.
///
/// Built exactly once per call and never mutated afterwards. A failed
/// envelope always carries a trace and the captured [`Failure`] as its
/// message; a successful one carries `"Success"` and no trace.
#[derive(Debug, Clone)]
pub struct RetResp {
    succeeded: bool,
    message: Message,
    trace: Option<String>,
    payload: Option<Value>,
}

impl RetResp {
    pub fn new(
        succeeded: bool,
        message: Message,
        trace: Option<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            succeeded,
            message,
            trace,
            payload,
        }
    }

    pub(crate) fn success(payload: Value) -> Self {
        Self::new(true, Message::Text(SUCCESS.to_string()), None, Some(payload))
    }

    pub(crate) fn failure(failure: Failure) -> Self {
        let trace = failure.format_trace();
        Self::new(false, Message::Failure(Arc::new(failure)), Some(trace), None)
    }

    pub(crate) fn capture(
        outcome: Result<Result<Value, anyhow::Error>, Box<dyn Any + Send>>,
    ) -> Self {
        match outcome {
            Ok(Ok(payload)) => Self::success(payload),
            Ok(Err(err)) => Self::failure(Failure::Error(err)),
            Err(panic) => Self::failure(Failure::from_panic(panic)),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn failed(&self) -> bool {
        !self.succeeded
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Returns a copy of the payload if it is of type `T`.
    ///
    /// Every call clones, so mutating the returned value never affects the
    /// envelope or later reads.
    pub fn payload<T: Any + Clone>(&self) -> Option<T> {
        self.payload_ref::<T>().cloned()
    }

    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }

    pub fn raw_payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn get(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Succeeded => FieldValue::Succeeded(self.succeeded),
            Field::Message => FieldValue::Message(&self.message),
            Field::Trace => FieldValue::Trace(self.trace.as_deref()),
            Field::Payload => FieldValue::Payload(self.payload.as_ref()),
        }
    }

    /// Positional access: `0..=3` maps to succeeded, message, trace, payload.
    pub fn at(&self, index: usize) -> Option<FieldValue<'_>> {
        Field::try_from(index).ok().map(|field| self.get(field))
    }

    pub fn by_name(&self, name: &str) -> Option<FieldValue<'_>> {
        name.parse::<Field>().ok().map(|field| self.get(field))
    }
}

/// `Succeeded: {payload:?}` or `Failed: {message}`.
///
/// The payload is type-erased, so it renders through `Debug`: a string
/// payload keeps its quotes (`Succeeded: "text"`).
impl fmt::Display for RetResp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            return match &self.payload {
                Some(payload) => write!(f, "Succeeded: {payload:?}"),
                None => write!(f, "Succeeded: None"),
            };
        }
        let msg = self.message.to_string();
        if msg.is_empty() {
            write!(f, "Failed: No Msg")
        } else {
            write!(f, "Failed: {msg}")
        }
    }
}

/// Names the four envelope fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Succeeded,
    Message,
    Trace,
    Payload,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("envelope index {0} out of range (0..=3)")]
    OutOfRange(usize),
    #[error("unknown envelope field `{0}`")]
    UnknownName(String),
}

impl TryFrom<usize> for Field {
    type Error = FieldError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::Succeeded),
            1 => Ok(Self::Message),
            2 => Ok(Self::Trace),
            3 => Ok(Self::Payload),
            other => Err(FieldError::OutOfRange(other)),
        }
    }
}

impl FromStr for Field {
    type Err = FieldError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "succeeded" => Ok(Self::Succeeded),
            "message" => Ok(Self::Message),
            "trace" => Ok(Self::Trace),
            "payload" => Ok(Self::Payload),
            other => Err(FieldError::UnknownName(other.to_string())),
        }
    }
}

/// A borrowed view of one envelope field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Succeeded(bool),
    Message(&'a Message),
    Trace(Option<&'a str>),
    Payload(Option<&'a Value>),
}

impl PartialEq for FieldValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Succeeded(a), Self::Succeeded(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Trace(a), Self::Trace(b)) => a == b,
            (Self::Payload(a), Self::Payload(b)) => match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            _ => false,
        }
    }
}
