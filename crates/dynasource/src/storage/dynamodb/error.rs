//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `SourceError` from `dynasource_core::source`.
//! Requests that never reached DynamoDB become `Connection` errors; every
//! other failure becomes `Transport` with the SDK's error context as cause.

use std::error::Error;
use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use dynasource_core::source::SourceError;

const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const INTERNAL_SERVER_ERROR: &str = "DynamoDB internal server error";
const TABLE_NOT_FOUND: &str = "Table not found";

/// Split an SDK error into its service error, or map it directly when the
/// request failed before DynamoDB answered.
fn service_error<E, R>(err: SdkError<E, R>, operation: &str) -> Result<E, SourceError>
where
    E: Error + 'static,
    R: Debug,
{
    match err {
        SdkError::ServiceError(service) => Ok(service.into_err()),
        err @ (SdkError::ConstructionFailure(_) | SdkError::DispatchFailure(_)) => {
            Err(SourceError::connection(
                format!("{operation} could not reach DynamoDB"),
                DisplayErrorContext(&err),
            ))
        }
        err => Err(SourceError::transport_with_cause(
            format!("{operation} failed"),
            DisplayErrorContext(&err),
        )),
    }
}

fn with_context<E: Error>(message: &str, err: &E) -> SourceError {
    SourceError::transport_with_cause(message, DisplayErrorContext(err))
}

/// Map a GetItem SDK error to SourceError.
pub fn map_get_item_error<R: Debug>(err: SdkError<GetItemError, R>) -> SourceError {
    match service_error(err, "GetItem") {
        Ok(err) => match &err {
            GetItemError::ResourceNotFoundException(_) => with_context(TABLE_NOT_FOUND, &err),
            GetItemError::ProvisionedThroughputExceededException(_) => {
                with_context(THROUGHPUT_EXCEEDED, &err)
            }
            GetItemError::RequestLimitExceeded(_) => with_context(REQUEST_LIMIT_EXCEEDED, &err),
            GetItemError::InternalServerError(_) => with_context(INTERNAL_SERVER_ERROR, &err),
            _ => with_context("GetItem failed", &err),
        },
        Err(e) => e,
    }
}

/// Map a PutItem SDK error to SourceError.
pub fn map_put_item_error<R: Debug>(err: SdkError<PutItemError, R>) -> SourceError {
    match service_error(err, "PutItem") {
        Ok(err) => match &err {
            PutItemError::ConditionalCheckFailedException(_) => {
                with_context("Conditional check failed", &err)
            }
            PutItemError::ResourceNotFoundException(_) => with_context(TABLE_NOT_FOUND, &err),
            PutItemError::ProvisionedThroughputExceededException(_) => {
                with_context(THROUGHPUT_EXCEEDED, &err)
            }
            PutItemError::RequestLimitExceeded(_) => with_context(REQUEST_LIMIT_EXCEEDED, &err),
            PutItemError::ItemCollectionSizeLimitExceededException(_) => {
                with_context("Item collection size limit exceeded", &err)
            }
            PutItemError::TransactionConflictException(_) => {
                with_context("Transaction conflict, please retry", &err)
            }
            PutItemError::InternalServerError(_) => with_context(INTERNAL_SERVER_ERROR, &err),
            _ => with_context("PutItem failed", &err),
        },
        Err(e) => e,
    }
}

/// Map an UpdateItem SDK error to SourceError.
pub fn map_update_item_error<R: Debug>(err: SdkError<UpdateItemError, R>) -> SourceError {
    match service_error(err, "UpdateItem") {
        Ok(err) => match &err {
            UpdateItemError::ConditionalCheckFailedException(_) => {
                with_context("Conditional check failed", &err)
            }
            UpdateItemError::ResourceNotFoundException(_) => with_context(TABLE_NOT_FOUND, &err),
            UpdateItemError::ProvisionedThroughputExceededException(_) => {
                with_context(THROUGHPUT_EXCEEDED, &err)
            }
            UpdateItemError::RequestLimitExceeded(_) => {
                with_context(REQUEST_LIMIT_EXCEEDED, &err)
            }
            UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
                with_context("Item collection size limit exceeded", &err)
            }
            UpdateItemError::TransactionConflictException(_) => {
                with_context("Transaction conflict, please retry", &err)
            }
            UpdateItemError::InternalServerError(_) => with_context(INTERNAL_SERVER_ERROR, &err),
            _ => with_context("UpdateItem failed", &err),
        },
        Err(e) => e,
    }
}

/// Map a DescribeTable SDK error to SourceError.
pub fn map_describe_table_error<R: Debug>(err: SdkError<DescribeTableError, R>) -> SourceError {
    match service_error(err, "DescribeTable") {
        Ok(err) => match &err {
            DescribeTableError::ResourceNotFoundException(_) => {
                with_context(TABLE_NOT_FOUND, &err)
            }
            DescribeTableError::InternalServerError(_) => {
                with_context(INTERNAL_SERVER_ERROR, &err)
            }
            _ => with_context("DescribeTable failed", &err),
        },
        Err(e) => e,
    }
}

/// Map a Query SDK error to SourceError.
pub fn map_query_error<R: Debug>(err: SdkError<QueryError, R>) -> SourceError {
    match service_error(err, "Query") {
        Ok(err) => match &err {
            QueryError::ResourceNotFoundException(_) => with_context(TABLE_NOT_FOUND, &err),
            QueryError::ProvisionedThroughputExceededException(_) => {
                with_context(THROUGHPUT_EXCEEDED, &err)
            }
            QueryError::RequestLimitExceeded(_) => with_context(REQUEST_LIMIT_EXCEEDED, &err),
            QueryError::InternalServerError(_) => with_context(INTERNAL_SERVER_ERROR, &err),
            _ => with_context("Query failed", &err),
        },
        Err(e) => e,
    }
}

/// Map a Scan SDK error to SourceError.
pub fn map_scan_error<R: Debug>(err: SdkError<ScanError, R>) -> SourceError {
    match service_error(err, "Scan") {
        Ok(err) => match &err {
            ScanError::ResourceNotFoundException(_) => with_context(TABLE_NOT_FOUND, &err),
            ScanError::ProvisionedThroughputExceededException(_) => {
                with_context(THROUGHPUT_EXCEEDED, &err)
            }
            ScanError::RequestLimitExceeded(_) => with_context(REQUEST_LIMIT_EXCEEDED, &err),
            ScanError::InternalServerError(_) => with_context(INTERNAL_SERVER_ERROR, &err),
            _ => with_context("Scan failed", &err),
        },
        Err(e) => e,
    }
}
