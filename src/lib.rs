//! Session and account core of a SaaS starter: signed cookie sessions with
//! sliding renewal, route protection, and validated account actions.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod activity;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod activity;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod session;
}

pub mod handlers {
    pub mod account;
    pub mod user;
}

pub mod middleware_layer {
    pub mod gatekeeper;
}

pub mod validation {
    pub mod action;
}
