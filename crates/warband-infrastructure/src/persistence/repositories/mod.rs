mod account_repo;

pub use account_repo::InMemoryAccountRepository;
