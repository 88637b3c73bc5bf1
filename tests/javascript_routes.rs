use routescan::model::HttpMethod;
use routescan::scanner::matcher::MatcherSet;
use routescan::scanner::walk::SourceFile;

fn file(rel_path: &str, language: &'static str) -> SourceFile {
    SourceFile {
        rel_path: rel_path.to_string(),
        abs_path: rel_path.into(),
        language,
    }
}

#[test]
fn express_file_is_attributed_to_express() {
    let source = r#"
const express = require('express');
const router = express.Router();

router.get('/', (req, res) => {
  res.send('Get all users');
});

router.post('/', (req, res) => {
  res.send('Create user');
});

router.put('/:id/:surname/:chauke', (req, res) => {
  res.send('Update user');
});

module.exports = router;
"#;
    let mut matchers = MatcherSet::new().unwrap();
    let (framework, candidates) = matchers
        .extract(&file("routes/user.js", "javascript"), source)
        .unwrap()
        .expect("file must be claimed");
    assert_eq!(framework, "express");
    assert_eq!(candidates.len(), 3);
    let names: Vec<_> = candidates[2].params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "surname", "chauke"]);
}

#[test]
fn fastify_import_outranks_the_express_fallback() {
    let source = r#"
const fastify = require('fastify')();

fastify.get('/status', async () => ({ ok: true }));
"#;
    let mut matchers = MatcherSet::new().unwrap();
    let (framework, candidates) = matchers
        .extract(&file("server.js", "javascript"), source)
        .unwrap()
        .expect("file must be claimed");
    assert_eq!(framework, "fastify");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].method, HttpMethod::Get);
}

#[test]
fn nest_controllers_outrank_other_typescript_matchers() {
    let source = r#"
import { Controller, Get, Delete } from '@nestjs/common';

@Controller('cars')
export class CarsController {
  @Get()
  findAll() {
    return [];
  }

  @Delete(':id')
  remove(id: string) {
    return id;
  }
}
"#;
    let mut matchers = MatcherSet::new().unwrap();
    let (framework, candidates) = matchers
        .extract(&file("src/cars.controller.ts", "typescript"), source)
        .unwrap()
        .expect("file must be claimed");
    assert_eq!(framework, "nestjs");
    let observed: Vec<_> = candidates
        .iter()
        .map(|c| (c.method, c.raw_path.as_str()))
        .collect();
    assert_eq!(
        observed,
        vec![(HttpMethod::Get, "/cars"), (HttpMethod::Delete, "/cars/:id")]
    );
}

#[test]
fn mount_only_files_yield_no_synthetic_routes() {
    let source = r#"
const express = require('express');
const app = express();

const userRoutes = require('./routes/user');
app.use('/api/users', userRoutes);

const productRoutes = require('./routes/product');
app.use('/api/products', productRoutes);

app.listen(3000);
"#;
    let mut matchers = MatcherSet::new().unwrap();
    let (framework, candidates) = matchers
        .extract(&file("app.js", "javascript"), source)
        .unwrap()
        .expect("file must be claimed");
    assert_eq!(framework, "express");
    assert!(candidates.is_empty());
}

#[test]
fn plain_scripts_are_claimed_by_nobody() {
    let source = r#"
const fs = require('fs');
fs.readFileSync('/etc/hosts');
"#;
    let mut matchers = MatcherSet::new().unwrap();
    let claimed = matchers
        .extract(&file("tool.js", "javascript"), source)
        .unwrap();
    assert!(claimed.is_none());
}
