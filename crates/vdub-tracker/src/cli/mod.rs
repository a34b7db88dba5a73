/*
[INPUT]:  Interactive terminal sessions
[OUTPUT]: Guided CLI flows
[POS]:    CLI layer - prompts that sit in front of the config file
[UPDATE]: When adding interactive flows
*/

pub mod init;
