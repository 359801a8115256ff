pub mod life_events;
pub mod rent_simulator;
pub mod what_if;
