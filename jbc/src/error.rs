use thiserror::Error;

/// A syntactic or semantic error encountered while reading JBC source.
///
/// Always carries the 1-based line number of the offending token.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
	pub line: usize,
	pub message: String,
}

impl ParseError {
	pub(crate) fn new(line: usize, message: impl Into<String>) -> ParseError {
		ParseError { line, message: message.into() }
	}
}

/// An error preventing a class model from being printed as JBC source.
#[derive(Debug, Error)]
pub enum PrintError {
	#[error("no label known for offset-like reference {0:?}")]
	MissingLabel(duke::tree::method::code::Label),
	#[error("don't know how to print target info {0}")]
	UnknownTargetInfo(&'static str),
	#[error("don't know how to print type path kind {0}")]
	UnknownTypePathKind(&'static str),
	#[error("don't know how to print reference kind {0}")]
	UnknownReferenceKind(&'static str),
	#[error("{0}")]
	Other(String),
	#[error(transparent)]
	Fmt(#[from] std::fmt::Error),
}

impl PrintError {
	pub(crate) fn other(message: impl Into<String>) -> PrintError {
		PrintError::Other(message.into())
	}
}
