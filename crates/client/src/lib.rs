//! Client library for the choir-administration import API.
//!
//! Wraps the HTTP endpoints ([`api`]), polls running jobs at a fixed
//! cadence ([`poller`]), and drives the select / preview / submit /
//! poll dialog flow ([`workflow`]). The `chorus-import` binary is a
//! thin CLI front-end over [`workflow`].

pub mod api;
pub mod poller;
pub mod workflow;
