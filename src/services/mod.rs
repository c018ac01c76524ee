pub mod reaction_service;
