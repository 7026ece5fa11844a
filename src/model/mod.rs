pub mod track;
pub mod queue;
pub mod gateway;
pub mod update;
pub mod player;
