pub mod authn;
