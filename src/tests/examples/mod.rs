mod config_validation;
