use std::ops::{Add, Deref, DerefMut};

/// A range of source text. Lines and columns are 1-based; the default
/// location (all zeros) is used for nodes that have no source of their own.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Location {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Location {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A location spanning a single line.
    pub fn line(line: usize, start_col: usize, end_col: usize) -> Self {
        Self::new(line, start_col, line, end_col)
    }

    fn start(&self) -> (usize, usize) {
        (self.start_line, self.start_col)
    }

    fn end(&self) -> (usize, usize) {
        (self.end_line, self.end_col)
    }
}

/// `a + b` is the smallest location covering both operands.
impl Add for Location {
    type Output = Location;

    fn add(self, other: Location) -> Location {
        let (start_line, start_col) = self.start().min(other.start());
        let (end_line, end_col) = self.end().max(other.end());

        Location {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}.{}-{}", self.start_line, self.start_col, self.end_col)
        } else {
            write!(
                f,
                "{}.{}-{}.{}",
                self.start_line, self.start_col, self.end_line, self.end_col
            )
        }
    }
}

/// A node paired with the location it was parsed from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Spanned<T> {
    pub location: Location,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(node: T, location: Location) -> Self {
        Self { location, node }
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

impl<T> DerefMut for Spanned<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.node
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node)
    }
}
