pub mod config;
pub mod csv;
pub mod http_transport;
pub mod llm_clients;
pub mod response;
pub mod security;
pub mod testrail;
