//! Git repositories hosted for builds.
//!
//! These endpoints address repositories of an account through the `{acct}`
//! path variable instead of impersonation.

use std::collections::BTreeMap;

use http::Method;
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::pagination::{Paginated, PaginationRequest};
use crate::{Client, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitRepo {
    pub id: String,
    pub name: String,
    pub build_stack: GitStack,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitStack {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitConfigPair {
    pub key: String,
    pub value: String,
}

#[derive(Deserialize)]
struct ReposEnvelope {
    #[serde(default)]
    repos: Vec<GitRepo>,
}

#[derive(Deserialize)]
struct RepoEnvelope {
    repo: GitRepo,
}

#[derive(Serialize, Deserialize, Default)]
struct ConfigVars {
    #[serde(default)]
    config_vars: BTreeMap<String, String>,
}

fn repo_path(repo: &str) -> String {
    format!("/git/repos/{{acct}}/{}", encode(repo))
}

/// One page of the account's repositories.
pub async fn list(
    client: &Client,
    page: &PaginationRequest,
) -> Result<Paginated<GitRepo>> {
    let req = client
        .build_request(Method::GET, "/git/repos/{acct}", false)?
        .json_body(page)?;

    let (envelope, pagination) =
        client.run_paginated::<ReposEnvelope>(req).await?;
    Ok(Paginated {
        items: envelope.repos,
        pagination,
    })
}

pub async fn info(client: &Client, repo: &str) -> Result<GitRepo> {
    let req = client.build_request(Method::GET, &repo_path(repo), false)?;
    let envelope: RepoEnvelope = client.run_json(req).await?;
    Ok(envelope.repo)
}

/// Deletes a repository. With `reset_only`, only its content is dropped
/// while the repository, its build history and configuration stay.
pub async fn destroy(
    client: &Client,
    repo: &str,
    reset_only: bool,
) -> Result<()> {
    let mut req = client.build_request(Method::DELETE, &repo_path(repo), false)?;
    if reset_only {
        req.url.query_pairs_mut().append_pair("reset", "1");
    }
    client.run_empty(req).await
}

pub async fn rename(client: &Client, repo: &str, new_name: &str) -> Result<()> {
    let mut req = client.build_request(Method::PATCH, &repo_path(repo), false)?;
    req.url.query_pairs_mut().append_pair("repo[name]", new_name);
    client.run_empty(req).await
}

/// Triggers a build and returns its output.
pub async fn rebuild(
    client: &Client,
    repo: &str,
    revision: Option<&str>,
) -> Result<String> {
    let path = format!("{}/builds", repo_path(repo));
    let mut req = client.build_request(Method::POST, &path, false)?;
    if let Some(revision) = revision.filter(|r| !r.is_empty()) {
        req.url
            .query_pairs_mut()
            .append_pair("build[revision]", revision);
    }
    client.run_text(req).await
}

/// The repository's build environment, sorted by key.
pub async fn config(client: &Client, repo: &str) -> Result<Vec<GitConfigPair>> {
    let path = format!("{}/config-vars", repo_path(repo));
    let req = client.build_request(Method::GET, &path, false)?;
    let vars: ConfigVars = client.run_json(req).await?;

    Ok(vars
        .config_vars
        .into_iter()
        .map(|(key, value)| GitConfigPair { key, value })
        .collect())
}

/// Merges `vars` into the repository's build environment.
pub async fn config_set(
    client: &Client,
    repo: &str,
    vars: BTreeMap<String, String>,
) -> Result<()> {
    let path = format!("{}/config-vars", repo_path(repo));
    let req = client
        .build_request(Method::PATCH, &path, false)?
        .json_body(&ConfigVars { config_vars: vars })?;
    client.run_empty(req).await
}

/// Build stacks available to repositories.
pub async fn stacks(client: &Client) -> Result<Vec<GitStack>> {
    let req = client.build_request(Method::GET, "/git/stacks", false)?;
    client.run_json(req).await
}

pub async fn stack_set(client: &Client, repo: &str, stack: &str) -> Result<()> {
    let mut req = client.build_request(Method::PATCH, &repo_path(repo), false)?;
    req.url
        .query_pairs_mut()
        .append_pair("repo[build_stack]", stack);
    client.run_empty(req).await
}
