pub mod accounts;
pub mod bybit;
pub mod config;
pub mod logger;
pub mod sign;
pub mod telegram;

// eof
