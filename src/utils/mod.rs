pub mod config_parser;
