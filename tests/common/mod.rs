//! Common test utilities for mercwarp.
//!
//! This module provides shared fixtures and checks for the integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod http_server;
pub mod image_utils;
pub mod test_data;
