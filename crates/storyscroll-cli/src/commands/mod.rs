pub mod check;
pub mod init_config;
pub mod inspect;
pub mod run;
