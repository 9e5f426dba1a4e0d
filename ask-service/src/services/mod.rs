pub mod ask;
pub mod providers;

pub use ask::answer_question;
