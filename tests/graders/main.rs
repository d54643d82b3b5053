mod corruption;
mod report;
