// SPDX-License-Identifier: Apache-2.0

pub mod canonical;
pub mod config;
pub mod env;
