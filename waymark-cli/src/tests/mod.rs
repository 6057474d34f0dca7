//! Shared test harness modules for the Waymark CLI.

use super::*;

mod helpers;
mod nearby_steps;
mod regions_steps;
mod search_steps;
mod unit;
