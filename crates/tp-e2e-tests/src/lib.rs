//! End-to-end tests for TaskPilot live under `tests/`.
