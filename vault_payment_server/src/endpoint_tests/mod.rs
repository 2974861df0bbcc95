mod accounts;
mod helpers;
mod mocks;
mod operator;
mod poll;
mod webhooks;
