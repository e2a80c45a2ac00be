// test_server.rs
//
// Copyright 2025 Hidden London contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use http_test_server::http::Status;
use http_test_server::TestServer;

use std::net::TcpListener;
use std::time::Duration;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Table API list response, as the remote sends it.
pub const TWO_EPISODES: &str = r#"{
    "data": [
        {
            "id": "ep_remote_1",
            "title": "Remote One",
            "meta_description": "",
            "content": "<p>one</p>",
            "image_url": null,
            "status": "published",
            "episode_order": 1,
            "created_at": 1714521600000,
            "updated_at": 1714521600000
        },
        {
            "id": "ep_remote_2",
            "title": "Remote Two",
            "content": "<p>two</p>",
            "status": "draft",
            "episode_order": 2,
            "created_at": "2024-05-02T00:00:00.000Z"
        }
    ],
    "total": 2,
    "page": 1,
    "limit": 100
}"#;

pub fn mock_url(server: &TestServer) -> String {
    format!("http://127.0.0.1:{}/", server.port())
}

/// Url of a local port nothing listens on.
pub fn closed_port_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(format!("http://127.0.0.1:{}/", port))
}

/// A table API that answers every list with a 500.
pub fn failing_server() -> Result<TestServer> {
    let server = TestServer::new()?;
    for table in ["episodes", "clans", "locations"] {
        server
            .create_resource(&format!("/tables/{table}"))
            .status(Status::InternalServerError)
            .header("Content-Type", "application/json")
            .body(r#"{"error": "internal"}"#);
    }
    Ok(server)
}
