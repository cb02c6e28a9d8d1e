pub mod battery;
pub mod dispatcher;
pub mod flow;
pub mod interval;
pub mod sample;
