pub mod scan_auth;
