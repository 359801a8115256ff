pub mod dti;
pub mod pmi;
