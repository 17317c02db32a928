/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`    — Interactive chat session
- `serve`   — HTTP completion proxy
- `history` — Stored session management
- `auth`    — Credential management

These handlers are intentionally small and use the library components:
providers, the chat orchestrator, and the session store.
*/

pub mod auth;
pub mod chat;
pub mod history;
pub mod serve;
