mod http_client;
mod support;
