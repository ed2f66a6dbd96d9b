pub mod court;
