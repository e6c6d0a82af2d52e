//! Features backed by remote services

pub mod translator;
