use thiserror::Error;

use crate::{ObjectHandle, StringName, VariantType};

// === CallError === //

/// The failure half of an invocation result.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CallError {
    #[error("attempted to call a null callable")]
    TargetIsNull,

    #[error("target object {target:?} no longer exists")]
    StaleTarget { target: ObjectHandle },

    #[error("target object has no method named {method:?}")]
    InvalidMethod { method: StringName },

    #[error("argument {index} has an invalid type; expected {expected:?}")]
    InvalidArgument { index: usize, expected: VariantType },

    #[error("too many arguments; expected at most {expected}")]
    TooManyArguments { expected: usize },

    #[error("too few arguments; expected at least {expected}")]
    TooFewArguments { expected: usize },

    #[error("call failed: {reason}")]
    Failed { reason: String },
}

// === CallableError === //

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Error)]
pub enum ContractViolation {
    #[error("method argument to a callable constructor must be a non-empty name")]
    EmptyMethod,

    #[error("object argument to a callable constructor must be non-null")]
    NullObject,
}

/// Failures while constructing or introspecting a [`Callable`](crate::Callable).
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Error)]
pub enum CallableError {
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),

    #[error("custom callable is already referenced by another callable")]
    AlreadyReferenced,

    #[error("custom callables do not have a method name")]
    InvalidMethodOnCustom,
}

// === ConnectError === //

/// Failures of [`Signal`](crate::Signal) operations and of the connection bookkeeping behind them.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Error)]
pub enum ConnectError {
    #[error("signal target is null or no longer exists")]
    Unconfigured,

    #[error("object has no signal named {signal:?}")]
    NonexistentSignal { signal: StringName },

    #[error("callable is already connected to signal {signal:?}")]
    AlreadyConnected { signal: StringName },

    #[error("callable is not connected to signal {signal:?}")]
    NotConnected { signal: StringName },

    #[error("cannot connect a null callable")]
    NullCallable,
}
