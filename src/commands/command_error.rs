use thiserror::Error;

/// Errors returned by individual commands.
///
/// The `Display` text of every variant is the exact error string a real
/// server sends, so callers can compare messages verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotInteger,
    #[error("ERR value is not a valid float")]
    NotFloat,
    #[error("ERR index out of range")]
    IndexOutOfRange,
    #[error("ERR no such key")]
    NoSuchKey,
    #[error("ERR wrong number of arguments for '{0}' command")]
    BadArity(String),
    #[error("Connection in subscriber mode, only subscriber commands may be used")]
    SubscriberModeViolation,
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("ERR increment would produce NaN or Infinity")]
    NanOrInfinity,
    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("ERR DB index is out of range")]
    InvalidDbIndex,
    #[error("ERR min or max is not a float")]
    InvalidScoreBound,
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR invalid cursor")]
    InvalidCursor,
    #[error("ERR XX and NX options at the same time are not compatible")]
    XxAndNx,
    #[error("ERR INCR option supports a single increment-element pair")]
    IncrSinglePair,
    #[error("ERR at least 1 input key is needed for ZUNIONSTORE/ZINTERSTORE")]
    UnionWithoutKeys,
    #[error("ERR weight value is not a float")]
    InvalidWeight,
    #[error("ERR Command not allowed inside a transaction")]
    NotAllowedInTransaction,
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAbort,
}

impl CommandError {
    pub fn bad_arity(command: &str) -> Self {
        CommandError::BadArity(command.to_lowercase())
    }
}
