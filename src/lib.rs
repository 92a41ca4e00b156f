pub mod service {
    pub mod api_client;
    pub mod config_service;
    pub mod download_service;
    pub mod traits {
        pub mod i_service;
    }
}

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod models {
    pub mod batch;
    pub mod error;
}

pub mod action {
    pub mod cli;
    pub mod interactive;
}

pub mod utils {
    pub mod convert;
    pub mod file;
    pub mod utils;
    pub mod zip;
}
