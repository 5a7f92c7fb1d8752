//! Component tests for the hash and block tables
