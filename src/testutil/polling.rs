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
use std::future::Future;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(3);
const TICK: Duration = Duration::from_millis(5);

/// Polls the predicate until it holds. Panics with the message if it never does.
pub async fn eventually_async<F, Fut>(mut predicate: F, error_msg: &str)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let polling = async {
        while !predicate().await {
            tokio::time::sleep(TICK).await;
        }
    };
    if tokio::time::timeout(TIMEOUT, polling).await.is_err() {
        panic!("{}", error_msg);
    }
}
