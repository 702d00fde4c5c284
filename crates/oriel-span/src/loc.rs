use std::fmt;

use crate::{Span, source::SourceId};

pub type Located<T> = (T, Loc);

/// Where a construct was written: the source, its byte span and the
/// one-based line and column of its first character.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Loc {
    pub source: SourceId,
    pub line: u32,
    pub column: u32,
    pub span: Span,
}

impl Loc {
    #[inline]
    pub fn new(source: SourceId, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
            span: Span::default(),
        }
    }

    #[inline]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Location for things the compiler made up rather than read.
    #[inline]
    pub fn synthetic(source: SourceId) -> Self {
        Self::new(source, 0, 0)
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {:?}", self.line, self.column, self.source)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} in {}", self.line, self.column, self.source)
    }
}

impl ariadne::Span for Loc {
    type SourceId = SourceId;

    fn source(&self) -> &Self::SourceId {
        &self.source
    }

    fn start(&self) -> usize {
        self.span.start
    }

    fn end(&self) -> usize {
        self.span.end
    }
}
