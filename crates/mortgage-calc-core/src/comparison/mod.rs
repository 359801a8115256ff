pub mod arm_vs_fixed;
pub mod buy_vs_keep;
pub mod rent_vs_buy;
pub mod tco;
