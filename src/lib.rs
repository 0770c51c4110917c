// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A virtual piano keyboard.
//!
//! One sample per note is preloaded into memory at startup. Clicking an on-screen key or
//! pressing a mapped key on the computer keyboard plays the matching sample and briefly
//! highlights the key.

pub mod audio;
pub mod config;
pub mod controller;
pub mod notes;
pub mod piano;
pub mod samples;
pub mod ui;
pub mod verify;

#[cfg(test)]
pub mod testutil;
