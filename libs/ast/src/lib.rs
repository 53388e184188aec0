#[cfg(test)]
mod test;

mod definition;
mod expression;
mod location;
mod statement;
mod tree;
mod types;

pub use definition::*;
pub use expression::*;
pub use location::*;
pub use statement::*;
pub use tree::Tree;
pub use types::*;

use quick_error::quick_error;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        StatementOutsideCase(location: Location) {
            display("statement does not belong to any case of the switch statement")
        }
        DuplicateDefault(location: Location) {
            display("redeclaration of the default case")
        }
    }
}

impl Error {
    pub fn location(&self) -> Location {
        match self {
            Error::StatementOutsideCase(location) | Error::DuplicateDefault(location) => *location,
        }
    }
}
